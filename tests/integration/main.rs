//! Integration tests for parquet-queue.
//!
//! `pipeline_test` runs the whole request path against local files and needs
//! no external services. `sqs_test` talks to LocalStack and is marked
//! `#[ignore]`.
//!
//! ## Running LocalStack Tests
//!
//! 1. Start LocalStack:
//!    ```bash
//!    docker run -d -p 4566:4566 localstack/localstack
//!    ```
//!
//! 2. Run the ignored tests:
//!    ```bash
//!    LOCALSTACK_ENDPOINT=http://localhost:4566 cargo test -p integration-tests -- --ignored
//!    ```

mod common;
mod pipeline_test;
mod sqs_test;
