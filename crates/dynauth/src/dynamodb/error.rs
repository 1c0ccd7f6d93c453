//! DynamoDB error mapping.
//!
//! SDK errors are converted into the SDK's unified `aws_sdk_dynamodb::Error` and
//! carried unchanged as the source of `AdapterError::Database`.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use dynauth_core::adapter::AdapterError;

pub const GET_ITEM: &str = "GetItem";
pub const PUT_ITEM: &str = "PutItem";
pub const UPDATE_ITEM: &str = "UpdateItem";
pub const DELETE_ITEM: &str = "DeleteItem";
pub const QUERY: &str = "Query";

/// Map an SDK error of any DynamoDB operation to AdapterError.
pub fn map_sdk_error<E, R>(err: SdkError<E, R>, operation: &'static str) -> AdapterError
where
    aws_sdk_dynamodb::Error: From<SdkError<E, R>>,
{
    AdapterError::database(operation, aws_sdk_dynamodb::Error::from(err))
}

/// Whether an UpdateItem failed only because its `attribute_exists` condition did not hold.
///
/// This is how a missing item shows up on conditional updates.
pub fn is_conditional_check_failed<R: Debug>(err: &SdkError<UpdateItemError, R>) -> bool {
    err.as_service_error()
        .is_some_and(|e| e.is_conditional_check_failed_exception())
}
