// Test Helpers Module - Storage Testing Infrastructure
//
// Provides an in-memory storage strategy with switchable failure injection
// and scripted health, shared by unit tests, integration tests and benches.

pub mod in_memory;

pub use in_memory::InMemoryStrategy;
