pub mod submitters;
