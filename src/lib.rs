//! deploy-lock - Branch-hosted deployment lock detection
//!
//! A deployment lock lives in a GitHub repository as the branch
//! `branch-deploy-lock` carrying a `lock.json` descriptor. This library reads
//! that state through [`engine::locks::LockChecker`] and reports it through an
//! injected [`engine::reporter::Reporter`].

pub mod engine;
