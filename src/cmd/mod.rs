//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module          | Commands handled                                   |
//! |-----------------|-----------------------------------------------------|
//! | `project`       | `Init`                                             |
//! | `serve`         | `Serve`                                            |
//! | `steps`         | `Steps`, `Validate`                                |
//! | `export`        | `Export`                                           |
//! | `config`        | `Config`                                           |

pub mod config;
pub mod export;
pub mod project;
pub mod serve;
pub mod steps;

pub use config::cmd_config;
pub use export::cmd_export;
pub use project::cmd_init;
pub use serve::cmd_serve;
pub use steps::{cmd_steps, cmd_validate};
