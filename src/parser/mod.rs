pub mod changelog_parser;

pub use changelog_parser::ChangelogParser;
