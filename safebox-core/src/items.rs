use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use walkdir::WalkDir;

use crate::{Result, SafeboxError};

/// Rarity class of an item.
///
/// Declaration order is only used to break ties between tiers that share a
/// rank; "highest tier" comparisons go through a ranking table instead.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[serde(alias = "purple")]
    Common,
    #[serde(alias = "blue")]
    Uncommon,
    #[serde(alias = "gold")]
    Epic,
    #[serde(alias = "red")]
    Legendary,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Common, Tier::Uncommon, Tier::Epic, Tier::Legendary];

    pub fn name(self) -> &'static str {
        match self {
            Tier::Common => "common",
            Tier::Uncommon => "uncommon",
            Tier::Epic => "epic",
            Tier::Legendary => "legendary",
        }
    }

    /// Colour name used in item ids and sprite file names.
    pub fn source_name(self) -> &'static str {
        match self {
            Tier::Common => "purple",
            Tier::Uncommon => "blue",
            Tier::Epic => "gold",
            Tier::Legendary => "red",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tier {
    type Err = ItemParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Tier::ALL
            .into_iter()
            .find(|tier| tier.name() == lower || tier.source_name() == lower)
            .ok_or_else(|| ItemParseError::UnknownTier(s.to_string()))
    }
}

/// Errors raised while turning an item id into an [`Item`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ItemParseError {
    #[error("empty item id")]
    EmptyId,

    #[error("unknown tier '{0}'")]
    UnknownTier(String),

    #[error("item '{id}' has a zero-sized footprint")]
    ZeroFootprint { id: String },
}

impl From<ItemParseError> for SafeboxError {
    fn from(err: ItemParseError) -> Self {
        SafeboxError::Config(err.to_string())
    }
}

/// One value per tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierTable<T> {
    pub common: T,
    pub uncommon: T,
    pub epic: T,
    pub legendary: T,
}

impl<T> TierTable<T> {
    pub fn get(&self, tier: Tier) -> &T {
        match tier {
            Tier::Common => &self.common,
            Tier::Uncommon => &self.uncommon,
            Tier::Epic => &self.epic,
            Tier::Legendary => &self.legendary,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tier, &T)> + '_ {
        Tier::ALL.into_iter().map(move |tier| (tier, self.get(tier)))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub tier: Tier,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub value: u64,
}

impl Item {
    pub fn new(id: impl Into<String>, tier: Tier, width: u32, height: u32, value: u64) -> Self {
        Self {
            id: id.into(),
            tier,
            width,
            height,
            value,
        }
    }

    /// Parse an id of the form `<tier>_<W>x<H>_<name>`.
    ///
    /// Ids without a footprint segment (or with a malformed one) are 1x1,
    /// ids without any `_` are common 1x1.
    pub fn from_id(id: &str, value: u64) -> std::result::Result<Self, ItemParseError> {
        if id.is_empty() {
            return Err(ItemParseError::EmptyId);
        }

        let parts: Vec<&str> = id.split('_').collect();
        let (tier, (width, height)) = if parts.len() >= 2 {
            (parts[0].parse::<Tier>()?, parse_footprint(parts[1]))
        } else {
            (Tier::Common, (1, 1))
        };

        if width == 0 || height == 0 {
            return Err(ItemParseError::ZeroFootprint { id: id.to_string() });
        }

        Ok(Self::new(id, tier, width, height, value))
    }

    /// Footprint in cells, before rotation.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

fn parse_footprint(token: &str) -> (u32, u32) {
    let mut dims = token.split('x');
    match (dims.next(), dims.next(), dims.next()) {
        (Some(w), Some(h), None)
            if !w.is_empty()
                && !h.is_empty()
                && w.bytes().all(|b| b.is_ascii_digit())
                && h.bytes().all(|b| b.is_ascii_digit()) =>
        {
            match (w.parse(), h.parse()) {
                (Ok(w), Ok(h)) => (w, h),
                _ => (1, 1),
            }
        }
        _ => (1, 1),
    }
}

pub const DEFAULT_ITEM_VALUE: u64 = 1000;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

pub(crate) const ITEM_VALUES: &[(&str, u64)] = &[
    // blue
    ("blue_1x1_cha", 1200),
    ("blue_1x1_jidianqi", 1500),
    ("blue_1x1_kele", 800),
    ("blue_1x1_paotengpian", 1000),
    ("blue_1x1_sanjiao", 900),
    ("blue_1x1_shangyewenjian", 1100),
    ("blue_1x1_yinbi", 1300),
    ("blue_1x2_kafeihu", 2400),
    ("blue_1x2_nvlang", 2200),
    ("blue_1x2_wangyuanjing", 2600),
    ("blue_1x2_yandou", 2000),
    ("blue_1x2_zidanlingjian", 2800),
    ("blue_1x3_luyin", 3600),
    ("blue_2x1_qiangxieliangjian", 2400),
    ("blue_2x1_xianwei", 2200),
    ("blue_2x2_meiqiguan", 4800),
    ("blue_2x2_wenduji", 4400),
    ("blue_2x2_wurenji", 4600),
    ("blue_2x2_youqi", 4200),
    ("blue_2x2_zazhi", 4000),
    ("blue_2x3_shuini", 7200),
    ("blue_3x1_guju", 3600),
    ("blue_4x2_tainengban", 9600),
    // gold
    ("gold_1x1_1", 1936842),
    ("gold_1x1_2", 1576462),
    ("gold_1x1_chuliqi", 105766),
    ("gold_1x1_cpu", 64177),
    ("gold_1x1_duanzi", 58182),
    ("gold_1x1_huoji", 61611),
    ("gold_1x1_jinbi", 57741),
    ("gold_1x1_jingtou", 105244),
    ("gold_1x1_jiubei", 62760),
    ("gold_1x1_kafei", 68304),
    ("gold_1x1_mofang", 94669),
    ("gold_1x1_ranliao", 68336),
    ("gold_1x1_shouji", 61319),
    ("gold_1x1_tuzhi", 67208),
    ("gold_1x2_longshelan", 80863),
    ("gold_1x2_maixiaodan", 0),
    ("gold_1x2_taoyong", 90669),
    ("gold_2x2_danfan", 129910),
    ("gold_2x2_dianlan", 447649),
    ("gold_2x2_tongxunyi", 501153),
    ("gold_2x2_wangyuanjing", 93442),
    ("gold_2x2_zhayao", 131427),
    ("gold_2x2_zhong", 58000),
    ("gold_2x3_ranliaodianchi", 378482),
    ("gold_3x1_touguan", 143697),
    ("gold_3x2_", 394788),
    ("gold_3x2_bendishoushi", 424032),
    ("gold_4x3_fuwuqi", 593475),
    // purple
    ("purple_1x1_1", 338091),
    ("purple_1x1_2", 824218),
    ("purple_1x1_3", 3643636),
    ("purple_1x1_4", 1936842),
    ("purple_1x1_erhuan", 9500),
    ("purple_1x1_ganraoqi", 10000),
    ("purple_1x1_jiandiebi", 9000),
    ("purple_1x1_junshiqingbao", 11000),
    ("purple_1x1_neicun", 10500),
    ("purple_1x1_rexiangyi", 9200),
    ("purple_1x1_shoubing", 8800),
    ("purple_1x1_shoudian", 8600),
    ("purple_1x1_wandao", 9800),
    ("purple_1x2_dangan", 18000),
    ("purple_1x2_fuliaobao", 16000),
    ("purple_1x2_jiuhu", 17000),
    ("purple_1x2_shizhang", 19000),
    ("purple_1x2_shuihu", 15000),
    ("purple_1x2_tezhonggang", 20000),
    ("purple_1x2_tideng", 16500),
    ("purple_2x1_niuniu", 18000),
    ("purple_2x2_lixinji", 36000),
    ("purple_2x2_shouju", 34000),
    ("purple_2x2_xueyayi", 38000),
    ("purple_2x2_zhuban", 35000),
    ("purple_2x3_dentai", 54000),
    ("purple_3x2_bishou", 54000),
    ("purple_3x2_diandongche", 56000),
    // red
    ("red_1x1_1", 4085603),
    ("red_1x1_2", 6775951),
    ("red_1x1_3", 4603790),
    ("red_1x1_huaibiao", 214532),
    ("red_1x1_jixiebiao", 210234),
    ("red_1x1_xin", 13581911),
    ("red_1x1_yuzijiang", 174537),
    ("red_1x2_jintiao", 330271),
    ("red_1x2_maixiaodan", 0),
    ("red_1x2_xiangbin", 337113),
    ("red_2x1_huashi", 346382),
    ("red_2x1_xianka", 332793),
    ("red_2x2_jingui", 440000),
    ("red_2x2_junyongji", 534661),
    ("red_2x2_lu", 434781),
    ("red_2x2_tianyuandifang", 537003),
    ("red_2x2_weixing", 245000),
    ("red_2x3_liushengji", 1264435),
    ("red_2x3_rentou", 1300362),
    ("red_2x3_yiliaobot", 1253570),
    ("red_3x2_buzhanche", 1333684),
    ("red_3x2_dainnao", 3786322),
    ("red_3x2_paodan", 1440722),
    ("red_3x2_zhuangjiadianchi", 1339889),
    ("red_3x3_banzi", 2111841),
    ("red_3x3_chaosuan", 2003197),
    ("red_3x3_fanyinglu", 2147262),
    ("red_3x3_huxiji", 10962096),
    ("red_3x3_tanke", 2113480),
    ("red_3x3_wanjinleiguan", 3646401),
    ("red_3x3_zongheng", 3337324),
    ("red_3x4_daopian", 1427562),
    ("red_3x4_ranliao", 1400000),
    ("red_4x1_huatang", 676493),
    ("red_4x3_cipanzhenlie", 1662799),
    ("red_4x3_dongdidianchi", 1409728),
];

pub fn item_value(id: &str) -> u64 {
    ITEM_VALUES
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, value)| *value)
        .unwrap_or(DEFAULT_ITEM_VALUE)
}

/// Every known item, in table order.
pub fn builtin_catalog() -> Vec<Item> {
    ITEM_VALUES
        .iter()
        .filter_map(|(id, value)| Item::from_id(id, *value).ok())
        .collect()
}

/// Build a catalog from the sprite files in `dir` (one level, sorted by name).
///
/// Files whose stem does not parse as an item id are skipped with a warning.
pub fn scan_item_dir(dir: &Path) -> Result<Vec<Item>> {
    let mut catalog = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if !is_image {
            continue;
        }

        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        match Item::from_id(stem, item_value(stem)) {
            Ok(item) => catalog.push(item),
            Err(err) => log::warn!("skipping sprite {}: {}", path.display(), err),
        }
    }

    Ok(catalog)
}

/// Load a catalog from a JSON array of item records.
pub fn load_catalog_json(path: &Path) -> Result<Vec<Item>> {
    let data = fs::read_to_string(path)?;
    let catalog: Vec<Item> = serde_json::from_str(&data)?;

    if let Some(bad) = catalog.iter().find(|item| item.width == 0 || item.height == 0) {
        return Err(ItemParseError::ZeroFootprint { id: bad.id.clone() }.into());
    }

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tier_and_footprint_from_id() {
        let item = Item::from_id("red_3x4_daopian", 5).unwrap();
        assert_eq!(item.tier, Tier::Legendary);
        assert_eq!((item.width, item.height), (3, 4));
        assert_eq!(item.value, 5);
        assert_eq!(item.area(), 12);

        let slab = Item::new("slab", Tier::Epic, 70000, 70000, 0);
        assert_eq!(slab.area(), 4_900_000_000);
    }

    #[test]
    fn malformed_footprint_falls_back_to_single_cell() {
        let item = Item::from_id("blue_big_thing", 0).unwrap();
        assert_eq!((item.width, item.height), (1, 1));

        let item = Item::from_id("gold_2x_thing", 0).unwrap();
        assert_eq!((item.width, item.height), (1, 1));
    }

    #[test]
    fn id_without_segments_is_common() {
        let item = Item::from_id("mystery", 0).unwrap();
        assert_eq!(item.tier, Tier::Common);
        assert_eq!((item.width, item.height), (1, 1));
    }

    #[test]
    fn rejects_unknown_tier_and_zero_footprint() {
        assert_eq!(
            Item::from_id("green_1x1_x", 0),
            Err(ItemParseError::UnknownTier("green".to_string()))
        );
        assert!(matches!(
            Item::from_id("red_0x2_x", 0),
            Err(ItemParseError::ZeroFootprint { .. })
        ));
        assert_eq!(Item::from_id("", 0), Err(ItemParseError::EmptyId));
    }

    #[test]
    fn tier_accepts_both_name_sets() {
        assert_eq!("purple".parse::<Tier>().unwrap(), Tier::Common);
        assert_eq!("Uncommon".parse::<Tier>().unwrap(), Tier::Uncommon);
        assert_eq!("GOLD".parse::<Tier>().unwrap(), Tier::Epic);

        let tier: Tier = serde_json::from_str("\"red\"").unwrap();
        assert_eq!(tier, Tier::Legendary);
        assert_eq!(serde_json::to_string(&Tier::Legendary).unwrap(), "\"legendary\"");
    }

    #[test]
    fn builtin_catalog_covers_value_table() {
        let catalog = builtin_catalog();
        assert_eq!(catalog.len(), ITEM_VALUES.len());
        assert!(catalog.iter().all(|item| item.width >= 1 && item.height >= 1));
        for tier in Tier::ALL {
            assert!(catalog.iter().any(|item| item.tier == tier), "no {tier} items");
        }
    }

    #[test]
    fn unknown_ids_get_default_value() {
        assert_eq!(item_value("red_1x1_xin"), 13581911);
        assert_eq!(item_value("purple_9x9_nothing"), DEFAULT_ITEM_VALUE);
    }

    #[test]
    fn scans_only_image_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "red_1x1_xin.png",
            "blue_2x1_xianwei.JPG",
            "notes.txt",
            "green_1x1_bad.png",
        ] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("gold_1x1_nested.png")).unwrap();

        let catalog = scan_item_dir(dir.path()).unwrap();
        let ids: Vec<&str> = catalog.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["blue_2x1_xianwei", "red_1x1_xin"]);
        assert_eq!(catalog[1].value, 13581911);
        assert_eq!(catalog[0].value, 2200);
    }

    #[test]
    fn loads_json_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(
            &path,
            r#"[{"id":"a","tier":"gold","width":2,"height":1,"value":7},
                {"id":"b","tier":"common","width":1,"height":1}]"#,
        )
        .unwrap();

        let catalog = load_catalog_json(&path).unwrap();
        assert_eq!(catalog[0], Item::new("a", Tier::Epic, 2, 1, 7));
        assert_eq!(catalog[1].value, 0);

        fs::write(&path, r#"[{"id":"z","tier":"red","width":0,"height":1}]"#).unwrap();
        assert!(matches!(load_catalog_json(&path), Err(SafeboxError::Config(_))));
    }
}
