use teloxide::{RequestError, dispatching::UpdateHandler};

mod start;

pub(crate) fn schema() -> UpdateHandler<RequestError> {
    start::schema()
}
