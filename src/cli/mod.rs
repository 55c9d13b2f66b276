mod commands;
mod handlers;

pub use commands::{Cli, Commands, GlobalArgs};
pub use handlers::{
    handle_add, handle_delete, handle_edit, handle_list, handle_move, handle_serve, handle_shots,
};
