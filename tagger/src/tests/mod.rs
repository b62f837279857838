mod common;

mod evaluation_tests;
mod training_tests;
