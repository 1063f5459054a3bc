mod command;
mod openai;
mod spawner;
mod traits;

pub use command::CommandOracle;
pub use openai::{OpenAiOracle, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use spawner::{ProcessOutput, ProcessSpawner};
pub use traits::{Oracle, OracleConfig, OracleError, OracleType};

/// Create an oracle from its configuration
pub fn create_oracle(config: &OracleConfig) -> Result<Box<dyn Oracle>, OracleError> {
    match config.oracle_type {
        OracleType::OpenAi => Ok(Box::new(OpenAiOracle::from_config(config)?)),
        OracleType::Command => Ok(Box::new(CommandOracle::from_config(config))),
    }
}
