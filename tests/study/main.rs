#![allow(clippy::cast_precision_loss)]

mod ask_tell;
mod builder;
mod workflow;
