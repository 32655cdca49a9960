use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate a closed enum with stable code, display name and
/// `std::str::FromStr`. Serde uses the stable code on the wire.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal, $display:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub fn display_name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $display),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.display_name())
            }
        }
    };
}

str_enum!(DocumentStatus {
    Analyzing => "analyzing", "Analyzing",
    Completed => "completed", "Completed",
    Error => "error", "Error",
});

str_enum!(DocumentType {
    Contract => "contract", "Contract",
    Report => "report", "Report",
    Policy => "policy", "Policy",
    Other => "other", "Other",
});

str_enum!(SecurityLevel {
    Public => "public", "Public",
    Internal => "internal", "Internal",
    Confidential => "confidential", "Confidential",
    TopSecret => "top_secret", "Top secret",
});

str_enum!(Department {
    HumanResources => "hr", "Human resources",
    Finance => "finance", "Finance",
    Engineering => "tech", "Engineering",
    Sales => "sales", "Sales",
    Other => "other", "Other",
});

str_enum!(TimeWindow {
    Today => "today", "Today",
    Week => "week", "This week",
    Month => "month", "This month",
});

str_enum!(SharePermission {
    View => "view", "Can view",
    Edit => "edit", "Can edit",
});

str_enum!(BadgeVariant {
    Success => "success", "Success",
    Info => "info", "Info",
    Warning => "warning", "Warning",
    Danger => "danger", "Danger",
});

impl DocumentStatus {
    /// `Completed` and `Error` accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    pub fn badge_variant(&self) -> BadgeVariant {
        match self {
            Self::Analyzing => BadgeVariant::Info,
            Self::Completed => BadgeVariant::Success,
            Self::Error => BadgeVariant::Danger,
        }
    }
}

impl SecurityLevel {
    pub fn badge_variant(&self) -> BadgeVariant {
        match self {
            Self::Public => BadgeVariant::Success,
            Self::Internal => BadgeVariant::Info,
            Self::Confidential => BadgeVariant::Warning,
            Self::TopSecret => BadgeVariant::Danger,
        }
    }
}
