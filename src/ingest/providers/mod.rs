pub mod curated;
pub mod directory;
pub mod github;
pub mod hackernews;
pub mod trending;
