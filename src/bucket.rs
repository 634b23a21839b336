use std::fmt;

/// Days-until-deadline classification. The label set and ranges are fixed;
/// `from_days` is total over every integer plus the no-deadline case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeadlineBucket {
    Overdue,
    Within7,
    Within30,
    Within60,
    Within90,
    Beyond90,
    NoDeadline,
}

impl DeadlineBucket {
    /// Display order for distributions.
    pub const ALL: [DeadlineBucket; 7] = [
        DeadlineBucket::Overdue,
        DeadlineBucket::Within7,
        DeadlineBucket::Within30,
        DeadlineBucket::Within60,
        DeadlineBucket::Within90,
        DeadlineBucket::Beyond90,
        DeadlineBucket::NoDeadline,
    ];

    pub fn from_days(days: Option<i64>) -> Self {
        match days {
            None => Self::NoDeadline,
            Some(d) if d < 0 => Self::Overdue,
            Some(d) if d <= 7 => Self::Within7,
            Some(d) if d <= 30 => Self::Within30,
            Some(d) if d <= 60 => Self::Within60,
            Some(d) if d <= 90 => Self::Within90,
            Some(_) => Self::Beyond90,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Overdue => "Em atraso",
            Self::Within7 => "0-7 dias",
            Self::Within30 => "8-30 dias",
            Self::Within60 => "31-60 dias",
            Self::Within90 => "61-90 dias",
            Self::Beyond90 => ">90 dias",
            Self::NoDeadline => "Sem prazo",
        }
    }
}

impl fmt::Display for DeadlineBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
