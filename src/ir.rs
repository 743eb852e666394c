use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::IdGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "TB", alias = "TD")]
    TopDown,
    #[serde(rename = "BT")]
    BottomTop,
    #[serde(rename = "LR")]
    LeftRight,
    #[serde(rename = "RL")]
    RightLeft,
}

impl Direction {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "TD" | "TB" => Some(Self::TopDown),
            "BT" => Some(Self::BottomTop),
            "LR" => Some(Self::LeftRight),
            "RL" => Some(Self::RightLeft),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::TopDown => "TB",
            Self::BottomTop => "BT",
            Self::LeftRight => "LR",
            Self::RightLeft => "RL",
        }
    }

    /// Generations advance along the x axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::LeftRight | Self::RightLeft)
    }

    /// Whether the generation axis runs against screen coordinates.
    pub fn is_reversed(self) -> bool {
        matches!(self, Self::BottomTop | Self::RightLeft)
    }

    /// Node sides carrying the parents and children connectors.
    pub fn handle_sides(self) -> HandleSides {
        match self {
            Self::TopDown => HandleSides {
                parents: Side::Top,
                children: Side::Bottom,
            },
            Self::BottomTop => HandleSides {
                parents: Side::Bottom,
                children: Side::Top,
            },
            Self::LeftRight => HandleSides {
                parents: Side::Left,
                children: Side::Right,
            },
            Self::RightLeft => HandleSides {
                parents: Side::Right,
                children: Side::Left,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HandleSides {
    pub parents: Side,
    pub children: Side,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_date: Option<String>,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spouse_id: Option<String>,
    #[serde(default)]
    pub parent_ids: Vec<String>,
}

impl Person {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            birth_date: None,
            death_date: None,
            gender: Gender::default(),
            spouse_id: None,
            parent_ids: Vec::new(),
        }
    }

    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parent_ids = parents.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_spouse(mut self, spouse: impl Into<String>) -> Self {
        self.spouse_id = Some(spouse.into());
        self
    }

    pub fn first_parent(&self) -> Option<&str> {
        self.parent_ids.first().map(String::as_str)
    }

    /// Short "birth - death" label used next to the name.
    pub fn lifespan(&self) -> String {
        match (self.birth_date.as_deref(), self.death_date.as_deref()) {
            (None, None) => String::new(),
            (birth, Some(death)) => format!("{} - {}", birth.unwrap_or("?"), death),
            (Some(birth), None) => birth.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FamilySettings {
    #[serde(default)]
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FamilyDataset {
    #[serde(default)]
    pub members: Vec<Person>,
    #[serde(default)]
    pub settings: FamilySettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Child,
    Parent,
    Spouse,
    /// No relation; used for the first person of an empty tree.
    #[serde(rename = "self")]
    Standalone,
}

/// Form fields for a person that has not been assigned an id yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDraft {
    pub name: String,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub death_date: Option<String>,
    #[serde(default)]
    pub gender: Gender,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatasetError {
    #[error("unknown person `{0}`")]
    UnknownPerson(String),
    #[error("a spouse relation needs exactly one related person, got {0}")]
    SpouseArity(usize),
    #[error("person id `{0}` already exists")]
    DuplicateId(String),
}

impl FamilyDataset {
    pub fn new(members: Vec<Person>, direction: Direction) -> Self {
        Self {
            members,
            settings: FamilySettings { direction },
        }
    }

    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn direction(&self) -> Direction {
        self.settings.direction
    }

    pub fn person(&self, id: &str) -> Option<&Person> {
        self.members.iter().find(|person| person.id == id)
    }

    pub fn children_of(&self, id: &str) -> Vec<&Person> {
        self.members
            .iter()
            .filter(|person| person.parent_ids.iter().any(|parent| parent == id))
            .collect()
    }

    pub fn has_children(&self, id: &str) -> bool {
        self.members
            .iter()
            .any(|person| person.parent_ids.iter().any(|parent| parent == id))
    }

    pub fn spouse_of(&self, id: &str) -> Option<&Person> {
        let spouse_id = self.person(id)?.spouse_id.as_deref()?;
        self.person(spouse_id)
    }

    pub fn parents_of(&self, id: &str) -> Vec<&Person> {
        let Some(person) = self.person(id) else {
            return Vec::new();
        };
        self.members
            .iter()
            .filter(|candidate| person.parent_ids.contains(&candidate.id))
            .collect()
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.settings.direction = direction;
    }

    /// Adds a new person linked to `related` and returns the generated id.
    pub fn add_relative<G: IdGenerator>(
        &mut self,
        draft: PersonDraft,
        relation: Relation,
        related: &[String],
        ids: &mut G,
    ) -> Result<String, DatasetError> {
        for id in related {
            if self.person(id).is_none() {
                return Err(DatasetError::UnknownPerson(id.clone()));
            }
        }
        if relation == Relation::Spouse && related.len() != 1 {
            return Err(DatasetError::SpouseArity(related.len()));
        }

        let new_id = ids.next_id();
        if self.person(&new_id).is_some() {
            return Err(DatasetError::DuplicateId(new_id));
        }
        let mut person = Person {
            id: new_id.clone(),
            name: draft.name,
            birth_date: draft.birth_date,
            death_date: draft.death_date,
            gender: draft.gender,
            spouse_id: None,
            parent_ids: Vec::new(),
        };

        match relation {
            Relation::Child => {
                person.parent_ids = related.to_vec();
                self.members.push(person);
            }
            Relation::Parent => {
                self.members.push(person);
                for child in self
                    .members
                    .iter_mut()
                    .filter(|member| related.contains(&member.id))
                {
                    child.parent_ids.push(new_id.clone());
                }
            }
            Relation::Spouse => {
                let partner_id = &related[0];
                person.spouse_id = Some(partner_id.clone());
                self.members.push(person);
                if let Some(partner) = self
                    .members
                    .iter_mut()
                    .find(|member| &member.id == partner_id)
                {
                    partner.spouse_id = Some(new_id.clone());
                }
            }
            Relation::Standalone => self.members.push(person),
        }
        Ok(new_id)
    }

    /// Replaces the stored person with the same id.
    pub fn update_person(&mut self, person: Person) -> Result<(), DatasetError> {
        let slot = self
            .members
            .iter_mut()
            .find(|member| member.id == person.id)
            .ok_or_else(|| DatasetError::UnknownPerson(person.id.clone()))?;
        *slot = person;
        Ok(())
    }

    /// Removes a person along with every spouse and parent reference to them.
    pub fn remove_person(&mut self, id: &str) -> Result<Person, DatasetError> {
        let index = self
            .members
            .iter()
            .position(|member| member.id == id)
            .ok_or_else(|| DatasetError::UnknownPerson(id.to_string()))?;
        let removed = self.members.remove(index);
        for member in &mut self.members {
            if member.spouse_id.as_deref() == Some(id) {
                member.spouse_id = None;
            }
            member.parent_ids.retain(|parent| parent != id);
        }
        Ok(removed)
    }
}
