//! One spider per government portal

pub mod hk_csip;
pub mod japan_nisc;
pub mod nyc_cyber;

use super::Spider;
use crate::models::Region;

pub use hk_csip::HkCsipSpider;
pub use japan_nisc::JapanNiscSpider;
pub use nyc_cyber::NycCyberSpider;

pub fn spider_for(region: Region) -> Box<dyn Spider> {
  match region {
    Region::Hk => Box::new(HkCsipSpider),
    Region::Jp => Box::new(JapanNiscSpider),
    Region::Nyc => Box::new(NycCyberSpider),
  }
}

pub fn all_spiders() -> Vec<Box<dyn Spider>> {
  Region::ALL.iter().map(|region| spider_for(*region)).collect()
}
