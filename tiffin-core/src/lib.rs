#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_debug_implementations, missing_docs, rust_2018_idioms)]
#![deny(unreachable_pub)]

//! tiffin-core
//!
//! The one-time passcode engine behind account registration and password
//! resets, plus the request and response types shared with clients.

pub mod common;
pub mod error;
pub mod flow;
pub mod grant;
pub mod otp;
pub mod passcode;

pub use error::VerificationError;
pub use flow::VerificationFlow;
pub use grant::GrantStore;
pub use otp::OtpStore;
pub use passcode::Passcode;
