//! Integration tests for the batch generation system

mod batch_execution;
mod chunked_generator;
