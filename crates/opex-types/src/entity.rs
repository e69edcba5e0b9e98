use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// One of the four ledger accounts.
///
/// `FG` is the issuer pool; `BK`, `SC` and `TB` are the counterparties that
/// receive allocations when they confirm a project.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Entity {
    #[serde(rename = "FG")]
    Fg,
    #[serde(rename = "BK")]
    Bk,
    #[serde(rename = "SC")]
    Sc,
    #[serde(rename = "TB")]
    Tb,
}

impl Entity {
    /// All accounts, issuer first.
    pub const ALL: [Entity; 4] = [Entity::Fg, Entity::Bk, Entity::Sc, Entity::Tb];

    /// The two-letter account code.
    pub const fn code(self) -> &'static str {
        match self {
            Entity::Fg => "FG",
            Entity::Bk => "BK",
            Entity::Sc => "SC",
            Entity::Tb => "TB",
        }
    }

    /// The counterparty this account belongs to, or `None` for the issuer.
    pub const fn counterparty(self) -> Option<Counterparty> {
        match self {
            Entity::Fg => None,
            Entity::Bk => Some(Counterparty::Bk),
            Entity::Sc => Some(Counterparty::Sc),
            Entity::Tb => Some(Counterparty::Tb),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Entity {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FG" => Ok(Entity::Fg),
            "BK" => Ok(Entity::Bk),
            "SC" => Ok(Entity::Sc),
            "TB" => Ok(Entity::Tb),
            _ => Err(TypeError::UnknownEntity(s.to_string())),
        }
    }
}

/// A confirming counterparty: every account except the issuer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Counterparty {
    #[serde(rename = "BK")]
    Bk,
    #[serde(rename = "SC")]
    Sc,
    #[serde(rename = "TB")]
    Tb,
}

impl Counterparty {
    pub const ALL: [Counterparty; 3] = [Counterparty::Bk, Counterparty::Sc, Counterparty::Tb];

    pub const fn entity(self) -> Entity {
        match self {
            Counterparty::Bk => Entity::Bk,
            Counterparty::Sc => Entity::Sc,
            Counterparty::Tb => Entity::Tb,
        }
    }

    pub const fn code(self) -> &'static str {
        self.entity().code()
    }
}

impl From<Counterparty> for Entity {
    fn from(cp: Counterparty) -> Self {
        cp.entity()
    }
}

impl TryFrom<Entity> for Counterparty {
    type Error = TypeError;

    fn try_from(entity: Entity) -> Result<Self, Self::Error> {
        entity
            .counterparty()
            .ok_or_else(|| TypeError::NotCounterparty(entity.code().to_string()))
    }
}

impl fmt::Display for Counterparty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Counterparty {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Counterparty::try_from(s.parse::<Entity>()?)
    }
}
