//! Library components of the `sdtmq` command-line tool.

pub mod logging;
pub mod output;
pub mod session;
