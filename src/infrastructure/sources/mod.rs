//! Source adapters: one per legacy system or export format

mod bookmark_html;
mod bookmark_json;
mod common;
mod desktop_db;
mod disqus;
mod instapaper;
mod livejournal_posts;
mod livejournal_xml;
mod movable_type;
mod semagic_files;

pub use bookmark_html::{FavoritesSource, PocketSource, FAVORITES_FILE, POCKET_FILE};
pub use bookmark_json::{DeliciousSource, PinboardSource, DELICIOUS_FILE, PINBOARD_FILE};
pub use desktop_db::DesktopDbSource;
pub use disqus::{parse_disqus, DisqusExport, DisqusSource};
pub use instapaper::{InstapaperSource, INSTAPAPER_FILE};
pub use livejournal_posts::LivejournalPostSource;
pub use livejournal_xml::{parse_export, ExportError, LivejournalXmlSource, XML_PARTITION};
pub use movable_type::{MovableTypeBlogrollSource, MovableTypeSource};
pub use semagic_files::{SemagicFileSource, SEMAGIC_PARTITION};
