//! Config module tests
//!
//! Contains test suites for keymap file handling:
//! - Backup directory setup and timestamped backups
//! - Transactional writes with validation and rollback

mod transaction_tests;
