mod document_tests;
mod support;
