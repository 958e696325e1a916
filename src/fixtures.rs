#[cfg(test)]
pub mod test {
    use std::cmp::Ordering;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::str::FromStr;
    use std::time::Duration;

    use thiserror::Error;

    use crate::error::BoxError;
    use crate::value::{Parser, Value, parse_from_str};

    // -- A type with its own textual form and ordering --------------------------

    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    pub struct Version {
        pub major: u32,
        pub minor: u32,
    }

    #[derive(Debug, Error)]
    #[error("bad version {0:?}")]
    pub struct BadVersion(String);

    impl FromStr for Version {
        type Err = BadVersion;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let bad = || BadVersion(s.to_string());
            let (major, minor) = s.trim().split_once('.').ok_or_else(bad)?;
            Ok(Version {
                major: major.parse().map_err(|_| bad())?,
                minor: minor.parse().map_err(|_| bad())?,
            })
        }
    }

    impl Value for Version {
        fn text_parser() -> Option<Parser<Self>> {
            Some(parse_from_str::<Version>)
        }

        fn compare(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }

        fn to_text(&self) -> Option<String> {
            Some(format!("{}.{}", self.major, self.minor))
        }
    }

    // -- Durations for registered coercions and renderings ----------------------

    /// Parse `1h30m`, `90s`, `250ms` and the like.
    pub fn parse_duration(text: &str) -> Result<Duration, BoxError> {
        let mut rest = text.trim();
        if rest.is_empty() {
            return Err("empty duration".into());
        }
        let mut total = Duration::ZERO;
        while !rest.is_empty() {
            let digits = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            if digits == 0 {
                return Err(format!("invalid duration {text:?}").into());
            }
            let n: u32 = rest[..digits].parse()?;
            rest = &rest[digits..];
            let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
            let unit = match &rest[..unit_len] {
                "h" => Duration::from_secs(3600),
                "m" => Duration::from_secs(60),
                "s" => Duration::from_secs(1),
                "ms" => Duration::from_millis(1),
                "" => return Err(format!("missing unit in duration {text:?}").into()),
                other => return Err(format!("unknown unit {other:?} in duration {text:?}").into()),
            };
            total += unit * n;
            rest = &rest[unit_len..];
        }
        Ok(total)
    }

    pub fn format_duration(d: &Duration) -> String {
        let secs = d.as_secs();
        if secs == 0 {
            return "0s".into();
        }
        let mut out = String::new();
        for (n, unit) in [(secs / 3600, 'h'), (secs / 60 % 60, 'm'), (secs % 60, 's')] {
            if n > 0 {
                out.push_str(&format!("{n}{unit}"));
            }
        }
        out
    }

    // -- Sections ---------------------------------------------------------------

    crate::section! {
        #[derive(Debug, Default, PartialEq)]
        pub struct Base {
            pub root_dir: PathBuf,
            pub title: String => ("label,cb=on_label"),
            pub label_changes: u32 => ("-"),
        }
        callbacks { on_label }
    }

    impl Base {
        fn on_label(&mut self) {
            self.label_changes += 1;
        }
    }

    crate::section! {
        #[derive(Debug, Default, PartialEq)]
        pub struct Core {
            pub name: String,
            pub port: u16 => (",cb=on_port", min = "1"),
            pub verbose: bool,
            pub label: String,
            pub tags: Vec<String> => ("tag"),
            pub nickname: Option<String>,
            pub version: Version,
            pub mode: u32 => ("file-mode,int=o"),
            pub listen_backlog: u32 => (",cb=on_backlog"),
            pub ratio: f64,
            pub sep: char,
            pub flags: u32 => (",int=h"),
            pub offset: i32 => (",int=o"),
            pub port_changes: u32 => ("-"),
            pub base: Base,
        }
        callbacks { on_port }
    }

    impl Core {
        fn on_port(&mut self) {
            self.port_changes += 1;
        }
    }

    crate::section! {
        #[derive(Debug, Default, PartialEq)]
        pub struct Server {
            pub host: String,
            pub port: u16,
        }
    }

    crate::section! {
        #[derive(Debug, Default, PartialEq)]
        pub struct Extra {
            pub note: String,
        }
    }

    crate::config! {
        #[derive(Debug, Default, PartialEq)]
        pub struct Settings {
            pub core: Core,
            pub servers: BTreeMap<String, Server> => ("server"),
            pub extra: Option<Extra>,
            pub hidden: Extra => ("-"),
        }
    }

    // -- Registered types and bounds --------------------------------------------

    crate::section! {
        #[derive(Debug, Default, PartialEq)]
        pub struct RegTypes1 {
            pub duration1: Duration,
            pub duration2: Vec<Duration>,
            pub duration3: Option<Duration>,
        }
    }

    crate::section! {
        #[derive(Debug, Default, PartialEq)]
        pub struct Bounds {
            pub int_r1: i64 => ("", min = "10", max = "20"),
            pub int_r2: Vec<i64> => ("", min = "10", max = "20"),
            pub int_l1: i64 => ("", min = "10"),
            pub int_u1: i64 => ("", max = "20"),
            pub float_r1: f32 => ("", min = "10.0", max = "20.0"),
            pub string_r1: String => ("", min = "b", max = "zz"),
            pub duration_r1: Duration => ("", min = "1h", max = "1h30m"),
            pub version: Version => ("", min = "1.0", max = "2.0"),
            pub code: String => ("", minlen = "2", maxlen = "4"),
            pub broken: String => ("", minlen = "two"),
        }
    }

    crate::config! {
        #[derive(Debug, Default, PartialEq)]
        pub struct RegTypes {
            pub reg_types_1: RegTypes1,
            pub bounds_types_1: Bounds,
        }
    }

    #[test]
    fn version_parses_major_and_minor() {
        assert_eq!("1.4".parse::<Version>().unwrap(), Version { major: 1, minor: 4 });
        assert!("1".parse::<Version>().is_err());
        assert!("1.x".parse::<Version>().is_err());
    }

    #[test]
    fn durations_parse_and_format() {
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("1m1m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        for bad in ["30", "m", "", "5d"] {
            assert!(parse_duration(bad).is_err(), "{bad}");
        }
        assert_eq!(format_duration(&Duration::from_secs(5400)), "1h30m");
        assert_eq!(format_duration(&Duration::ZERO), "0s");
    }
}
