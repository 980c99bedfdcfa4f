/*
    Integration tests for core_post

    Test suite covering:
    - End-to-end operation scenarios
    - Authorization boundary per operation
    - Event emission on commit only
    - Randomized operation sequences checking record invariants
*/

pub mod authorization_tests;
pub mod property_tests;
