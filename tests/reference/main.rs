mod support;

mod catalog;
