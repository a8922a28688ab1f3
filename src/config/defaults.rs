use super::*;

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            password: String::new(),
            gateway_id: String::new(),
            timeout_secs: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: String::new(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8088,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: "America/Los_Angeles".to_string(),
            schedule: vec![
                ScheduleItem::new("00:05", "emergency_backup"),
                ScheduleItem::new("04:00", "time_of_use"),
            ],
            schedule_strict: false,
            normalizer: NormalizerConfig::default(),
            device: DeviceConfig::default(),
            logging: LoggingConfig::default(),
            web: WebConfig::default(),
        }
    }
}
