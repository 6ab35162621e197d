use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Account role as stored in the `users.role` column.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("USER", Role::User)]
    #[case("ADMIN", Role::Admin)]
    fn parses_stored_role(#[case] raw: &str, #[case] expected: Role) {
        assert_eq!(raw.parse::<Role>().unwrap(), expected);
        assert_eq!(expected.to_string(), raw);
    }

    #[test]
    fn rejects_unknown_role() {
        assert!("HR".parse::<Role>().is_err());
    }
}
