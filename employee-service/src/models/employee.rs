use mongodb::bson::{self, doc, Document};
use serde::{Deserialize, Serialize};

/// An employee as stored in the `employees` collection.
///
/// `id` is the business key and never changes after creation. MongoDB's own
/// `_id` is not part of the model; it is ignored on read and generated on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub name: String,
    pub id: String,
    pub position: String,
}

impl Employee {
    pub fn new(
        name: impl Into<String>,
        id: impl Into<String>,
        position: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            position: position.into(),
        }
    }

    /// Storage mapping: `{ name, id, position }`.
    pub fn to_wire(&self) -> Document {
        doc! {
            "name": self.name.as_str(),
            "id": self.id.as_str(),
            "position": self.position.as_str(),
        }
    }

    /// Inverse of [`Employee::to_wire`]. Extra keys such as `_id` are ignored;
    /// a missing or non-string field is an error.
    pub fn from_wire(document: Document) -> Result<Self, bson::de::Error> {
        bson::from_document(document)
    }
}

/// The mutable subset of an employee. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeUpdate {
    pub name: Option<String>,
    pub position: Option<String>,
}

impl EmployeeUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.position.is_none()
    }

    /// Body of the `$set` operator for this update.
    pub fn to_set_document(&self) -> Document {
        let mut set = Document::new();
        if let Some(name) = &self.name {
            set.insert("name", name.as_str());
        }
        if let Some(position) = &self.position {
            set.insert("position", position.as_str());
        }
        set
    }

    /// Apply to `employee`, returning whether any field actually changed.
    pub fn apply(&self, employee: &mut Employee) -> bool {
        let mut changed = false;
        if let Some(name) = &self.name {
            if employee.name != *name {
                employee.name = name.clone();
                changed = true;
            }
        }
        if let Some(position) = &self.position {
            if employee.position != *position {
                employee.position = position.clone();
                changed = true;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    #[test]
    fn wire_round_trip_preserves_record() {
        let employee = Employee::new("Alice", "E1", "Teacher");
        let restored = Employee::from_wire(employee.to_wire()).unwrap();
        assert_eq!(restored, employee);
    }

    #[test]
    fn from_wire_ignores_storage_id() {
        let document = doc! {
            "_id": ObjectId::new(),
            "name": "Bob",
            "id": "E2",
            "position": "Cook",
        };
        let employee = Employee::from_wire(document).unwrap();
        assert_eq!(employee, Employee::new("Bob", "E2", "Cook"));
    }

    #[test]
    fn from_wire_rejects_missing_field() {
        let document = doc! { "name": "Bob", "id": "E2" };
        assert!(Employee::from_wire(document).is_err());
    }

    #[test]
    fn set_document_contains_only_supplied_fields() {
        let update = EmployeeUpdate {
            name: None,
            position: Some("Lead Teacher".to_string()),
        };
        assert_eq!(update.to_set_document(), doc! { "position": "Lead Teacher" });
        assert!(EmployeeUpdate::default().is_empty());
    }

    #[test]
    fn apply_reports_no_change_for_equal_values() {
        let mut employee = Employee::new("Alice", "E1", "Teacher");
        let update = EmployeeUpdate {
            name: Some("Alice".to_string()),
            position: Some("Teacher".to_string()),
        };
        assert!(!update.apply(&mut employee));

        let update = EmployeeUpdate {
            name: None,
            position: Some("Lead Teacher".to_string()),
        };
        assert!(update.apply(&mut employee));
        assert_eq!(employee, Employee::new("Alice", "E1", "Lead Teacher"));
    }
}
