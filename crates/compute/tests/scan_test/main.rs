/// Integration tests for the segment scanner covering end-to-end detection
/// scenarios, failure isolation, parallel determinism, and report rendering.

mod helpers;
mod isolation;
mod parallel;
mod scenarios;
