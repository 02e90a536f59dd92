//! Background producers. Each adapter is a standalone async task whose only
//! contact with the engine is [`logdy_engine::Ingress::produce`].

mod demo;
mod exec;
pub mod lines;
mod stdin;
mod tail;
mod tcp;
pub mod validate;

pub use demo::run_demo_generator;
pub use exec::run_child_process;
pub use lines::{cut_lines, cut_lines_by_number, CutRange};
pub use stdin::run_stdin_reader;
pub use tail::run_file_tailer;
pub use tcp::run_tcp_listener;
