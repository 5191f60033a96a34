pub mod create_stack;
pub mod delete_stack;
pub mod get_stack_status;
