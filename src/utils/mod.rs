pub mod circuit_breaker;
pub mod payload_cipher;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};
pub use payload_cipher::{PayloadCipher, PayloadError, SealedEnvelope};
