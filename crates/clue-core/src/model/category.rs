use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Category {
    Suspect = 0,
    Weapon = 1,
    Room = 2,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Suspect, Category::Weapon, Category::Room];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Category::Suspect),
            1 => Some(Category::Weapon),
            2 => Some(Category::Room),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Number of cards printed for this category.
    pub const fn size(self) -> usize {
        match self {
            Category::Suspect => 6,
            Category::Weapon => 6,
            Category::Room => 9,
        }
    }

    /// Heading used by selection widgets ("Suspects", "Weapons", "Rooms").
    pub const fn plural(self) -> &'static str {
        match self {
            Category::Suspect => "Suspects",
            Category::Weapon => "Weapons",
            Category::Room => "Rooms",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Suspect => "Suspect",
            Category::Weapon => "Weapon",
            Category::Room => "Room",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::Category;

    #[test]
    fn sizes_cover_the_whole_deck() {
        let total: usize = Category::ALL.iter().map(|c| c.size()).sum();
        assert_eq!(total, 21);
    }

    #[test]
    fn from_index_maps_valid_values() {
        assert_eq!(Category::from_index(2), Some(Category::Room));
        assert_eq!(Category::from_index(3), None);
    }

    #[test]
    fn display_is_singular() {
        assert_eq!(Category::Weapon.to_string(), "Weapon");
        assert_eq!(Category::Weapon.plural(), "Weapons");
    }
}
