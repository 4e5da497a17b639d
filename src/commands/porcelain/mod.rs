//! Porcelain commands
//!
//! - `init`: create a repository
//! - `add` / `rm`: stage and unstage paths
//! - `commit`: record the index as a commit on the current branch
//! - `status`: staged, unstaged and untracked changes
//! - `log`: first-parent history
//! - `tag`: lightweight and annotated tags
//! - `checkout`: write a commit's tree into an empty directory

pub mod add;
pub mod checkout;
pub mod commit;
pub mod init;
pub mod log;
pub mod rm;
pub mod status;
pub mod tag;
