use tracing_appender::rolling::Rotation;

/// How often the log file is rolled over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogRotationKind {
    Minutely,
    #[default]
    Hourly,
    Daily,
    Never,
}

impl From<LogRotationKind> for Rotation {
    fn from(value: LogRotationKind) -> Self {
        match value {
            LogRotationKind::Minutely => Rotation::MINUTELY,
            LogRotationKind::Hourly => Rotation::HOURLY,
            LogRotationKind::Daily => Rotation::DAILY,
            LogRotationKind::Never => Rotation::NEVER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LogRotationKind;
    use clap::ValueEnum as _;
    use rstest::rstest;
    use tracing_appender::rolling::Rotation;

    #[rstest]
    #[case(LogRotationKind::Minutely, Rotation::MINUTELY)]
    #[case(LogRotationKind::Hourly, Rotation::HOURLY)]
    #[case(LogRotationKind::Daily, Rotation::DAILY)]
    #[case(LogRotationKind::Never, Rotation::NEVER)]
    fn it_maps_to_rotation_correctly(
        #[case] log_rotation_kind: LogRotationKind,
        #[case] expected: Rotation,
    ) {
        let actual: Rotation = log_rotation_kind.into();
        assert_eq!(expected, actual);
    }

    #[rstest]
    #[case("minutely", LogRotationKind::Minutely)]
    #[case("DAILY", LogRotationKind::Daily)]
    #[case("Never", LogRotationKind::Never)]
    fn it_parses_case_insensitively(#[case] input: &str, #[case] expected: LogRotationKind) {
        assert_eq!(LogRotationKind::from_str(input, true), Ok(expected));
    }
}
