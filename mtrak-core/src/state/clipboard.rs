//! Block clipboard for cut/copy/paste.

use mtrak_types::Block;

#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    contents: Option<Block>,
}

impl Clipboard {
    pub fn set(&mut self, block: Block) {
        self.contents = Some(block);
    }

    pub fn get(&self) -> Option<&Block> {
        self.contents.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_none()
    }

    pub fn clear(&mut self) {
        self.contents = None;
    }
}
