pub mod fetch_repository_issues;
