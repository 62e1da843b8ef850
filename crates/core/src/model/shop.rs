use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::progress::{ProgressError, UserProgress};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ShopError {
    #[error("insufficient points: balance {balance}, price {price}")]
    InsufficientPoints { balance: u64, price: u64 },

    #[error("item already purchased: {0}")]
    AlreadyPurchased(ShopItemId),

    #[error("unknown shop item: {0}")]
    UnknownItem(String),
}

/// Stable identifiers of the purchasable unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopItemId {
    ThemeDark,
    CustomAvatar,
    AdvancedStats,
    StudyMusic,
    ReminderSystem,
    ExportData,
}

impl ShopItemId {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ShopItemId::ThemeDark => "theme_dark",
            ShopItemId::CustomAvatar => "custom_avatar",
            ShopItemId::AdvancedStats => "advanced_stats",
            ShopItemId::StudyMusic => "study_music",
            ShopItemId::ReminderSystem => "reminder_system",
            ShopItemId::ExportData => "export_data",
        }
    }

    #[must_use]
    pub fn item(self) -> &'static ShopItem {
        SHOP_ITEMS
            .iter()
            .find(|item| item.id == self)
            .unwrap_or(&SHOP_ITEMS[0])
    }
}

impl fmt::Display for ShopItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShopItemId {
    type Err = ShopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        SHOP_ITEMS
            .iter()
            .map(|item| item.id)
            .find(|id| id.as_str() == wanted)
            .ok_or_else(|| ShopError::UnknownItem(wanted.to_string()))
    }
}

/// A non-consumable unlock paid for with points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopItem {
    pub id: ShopItemId,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub price: u64,
}

pub static SHOP_ITEMS: [ShopItem; 6] = [
    ShopItem {
        id: ShopItemId::ThemeDark,
        name: "暗黑主题",
        description: "酷炫的暗黑模式界面",
        icon: "🌙",
        price: 100,
    },
    ShopItem {
        id: ShopItemId::CustomAvatar,
        name: "自定义头像",
        description: "个性化你的头像",
        icon: "👤",
        price: 150,
    },
    ShopItem {
        id: ShopItemId::AdvancedStats,
        name: "高级统计",
        description: "更详细的学习数据分析",
        icon: "📈",
        price: 200,
    },
    ShopItem {
        id: ShopItemId::StudyMusic,
        name: "专注音乐",
        description: "学习时的背景音乐",
        icon: "🎵",
        price: 80,
    },
    ShopItem {
        id: ShopItemId::ReminderSystem,
        name: "智能提醒",
        description: "学习和复习提醒功能",
        icon: "⏰",
        price: 120,
    },
    ShopItem {
        id: ShopItemId::ExportData,
        name: "数据导出",
        description: "导出学习数据报告",
        icon: "📊",
        price: 180,
    },
];

/// Purchased item ids in purchase order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopState {
    purchased: Vec<ShopItemId>,
}

impl ShopState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_persisted(purchased: Vec<ShopItemId>) -> Self {
        let mut state = Self::new();
        for id in purchased {
            if !state.is_purchased(id) {
                state.purchased.push(id);
            }
        }
        state
    }

    #[must_use]
    pub fn is_purchased(&self, id: ShopItemId) -> bool {
        self.purchased.contains(&id)
    }

    #[must_use]
    pub fn purchased(&self) -> &[ShopItemId] {
        &self.purchased
    }

    /// Buy an item, charging its price exactly once.
    ///
    /// The balance is checked before the repeat-purchase check. Neither the
    /// balance nor the purchased set change on error.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::InsufficientPoints` or `ShopError::AlreadyPurchased`.
    pub fn purchase(
        &mut self,
        id: ShopItemId,
        wallet: &mut UserProgress,
    ) -> Result<&'static ShopItem, ShopError> {
        let item = id.item();
        if wallet.points() < item.price {
            return Err(ShopError::InsufficientPoints {
                balance: wallet.points(),
                price: item.price,
            });
        }
        if self.is_purchased(id) {
            return Err(ShopError::AlreadyPurchased(id));
        }
        wallet
            .spend_points(item.price)
            .map_err(|ProgressError::InsufficientPoints { balance, required }| {
                ShopError::InsufficientPoints {
                    balance,
                    price: required,
                }
            })?;
        self.purchased.push(id);
        Ok(item)
    }
}

/// Catalog entry annotated for the listing view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopListing {
    pub item: &'static ShopItem,
    pub purchased: bool,
    pub affordable: bool,
}

#[must_use]
pub fn listings(shop: &ShopState, points: u64) -> Vec<ShopListing> {
    SHOP_ITEMS
        .iter()
        .map(|item| ShopListing {
            item,
            purchased: shop.is_purchased(item.id),
            affordable: points >= item.price,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(points: u64) -> UserProgress {
        UserProgress::from_persisted(1, 0, points, 0, None)
    }

    #[test]
    fn purchase_deducts_once() {
        let mut shop = ShopState::new();
        let mut user = wallet(250);
        let item = shop.purchase(ShopItemId::ThemeDark, &mut user).unwrap();
        assert_eq!(item.price, 100);
        assert_eq!(user.points(), 150);
        assert!(shop.is_purchased(ShopItemId::ThemeDark));

        let err = shop.purchase(ShopItemId::ThemeDark, &mut user).unwrap_err();
        assert_eq!(err, ShopError::AlreadyPurchased(ShopItemId::ThemeDark));
        assert_eq!(user.points(), 150);
        assert_eq!(shop.purchased().len(), 1);
    }

    #[test]
    fn insufficient_points_leaves_state_untouched() {
        let mut shop = ShopState::new();
        let mut user = wallet(79);
        let err = shop.purchase(ShopItemId::StudyMusic, &mut user).unwrap_err();
        assert_eq!(
            err,
            ShopError::InsufficientPoints {
                balance: 79,
                price: 80
            }
        );
        assert_eq!(user.points(), 79);
        assert!(shop.purchased().is_empty());
    }

    #[test]
    fn balance_is_checked_before_repeat_purchase() {
        let mut shop = ShopState::from_persisted(vec![ShopItemId::AdvancedStats]);
        let mut user = wallet(10);
        let err = shop.purchase(ShopItemId::AdvancedStats, &mut user).unwrap_err();
        assert!(matches!(err, ShopError::InsufficientPoints { .. }));
    }

    #[test]
    fn parses_item_ids() {
        assert_eq!("export_data".parse::<ShopItemId>().unwrap(), ShopItemId::ExportData);
        assert_eq!(
            "rocket".parse::<ShopItemId>().unwrap_err(),
            ShopError::UnknownItem("rocket".into())
        );
    }

    #[test]
    fn listing_flags() {
        let shop = ShopState::from_persisted(vec![ShopItemId::ThemeDark]);
        let rows = listings(&shop, 120);
        let theme = rows.iter().find(|r| r.item.id == ShopItemId::ThemeDark).unwrap();
        assert!(theme.purchased);
        let stats = rows.iter().find(|r| r.item.id == ShopItemId::AdvancedStats).unwrap();
        assert!(!stats.affordable);
        let reminder = rows.iter().find(|r| r.item.id == ShopItemId::ReminderSystem).unwrap();
        assert!(reminder.affordable && !reminder.purchased);
    }
}
