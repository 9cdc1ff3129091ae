pub mod transcript; // Transcript → structured clinical note
