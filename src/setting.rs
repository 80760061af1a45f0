use std::fmt;
use std::rc::Rc;

use crate::path::Path;
use crate::setter::Setter;
use crate::types::Tags;

/// One configurable value: its path, its tags and the setter bound to its
/// storage.
#[derive(Clone)]
pub struct Setting {
    path: Path,
    tags: Tags,
    setter: Rc<dyn Setter>,
    type_name: String,
}

impl Setting {
    pub fn new(path: Path, tags: Tags, setter: Box<dyn Setter>, type_name: String) -> Self {
        Setting {
            path,
            tags,
            setter: Rc::from(setter),
            type_name,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn setter(&self) -> &dyn Setter {
        self.setter.as_ref()
    }

    /// A short, lowercase name of the value's type, e.g. `duration`.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Whether the setting may be handed to the source named `source`.
    pub fn accepts(&self, source: &str) -> bool {
        match self.tags.sources() {
            None => true,
            Some(names) => names.contains(&source),
        }
    }
}

impl fmt::Debug for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setting")
            .field("path", &self.path)
            .field("tags", &self.tags)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Settings kept sorted by path.
#[derive(Debug, Clone, Default)]
pub struct Settings(Vec<Setting>);

impl Settings {
    /// Insert `setting` after any settings with an equal or lesser path.
    pub fn add(&mut self, setting: Setting) {
        let index = self.0.partition_point(|s| s.path <= setting.path);
        self.0.insert(index, setting);
    }

    pub fn as_slice(&self) -> &[Setting] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Setting> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<Setting> {
        self.0
    }
}
