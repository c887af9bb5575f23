use super::parsing::{
    env_optional, env_or_default, parse_bool, parse_environment, parse_u16, parse_u32,
};
use super::types::{
    ConfigError, DatabaseSettings, RuntimeSettings, ServerHost, ServerPort, ServerSettings,
    Settings, TelemetrySettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("ASSIGNMENTS_HOST", "0.0.0.0");
        let port = env_or_default("ASSIGNMENTS_PORT", "5000");

        let environment = parse_environment(
            env_optional("ASSIGNMENTS_ENV").or_else(|| env_optional("ENVIRONMENT")),
        );
        let strict_config = env_optional("ASSIGNMENTS_STRICT_CONFIG")
            .map(|value| parse_bool(&value))
            .unwrap_or(false)
            || environment.is_production();

        let db_host = env_or_default("DB_HOST", "localhost");
        let db_port = parse_u16("DB_PORT", env_or_default("DB_PORT", "5432"))?;
        let db_username = env_or_default("DB_USERNAME", "assignments");
        let db_password = env_or_default("DB_PASSWORD", "");
        let db_name = env_or_default("DB_NAME", "assignment7");
        let database_url = env_optional("DATABASE_URL");
        let max_connections =
            parse_u32("DB_MAX_CONNECTIONS", env_or_default("DB_MAX_CONNECTIONS", "10"))?;

        let log_level = env_or_default("ASSIGNMENTS_LOG_LEVEL", "info");
        let json = env_optional("ASSIGNMENTS_LOG_JSON")
            .map(|value| parse_bool(&value))
            .unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            database: DatabaseSettings {
                host: db_host,
                port: db_port,
                username: db_username,
                password: db_password,
                name: db_name,
                database_url,
                max_connections,
            },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;

        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "DB_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.password.is_empty() {
            return Err(ConfigError::MissingSecret("DB_PASSWORD"));
        }

        Ok(())
    }
}
