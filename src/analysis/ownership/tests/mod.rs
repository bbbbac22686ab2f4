mod environment_tests;
mod test_support;
mod transfer_tests;
