//! Integration tests for the scheduling core

mod catalog_tests;
mod timetable_tests;
