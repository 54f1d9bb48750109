pub mod external_apis;
