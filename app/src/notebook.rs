//! FILENAME: app/src/notebook.rs
//! PURPOSE: Tabbed page containers. A tab holds a form screen, another
//! notebook, or an empty placeholder page.
//! CONTEXT: Selecting a tab shows its form directly; there is no event bus
//! between the notebook and the controllers.

use forms::{Command, Outcome};

use crate::error::AppError;
use crate::screens::Screen;

pub enum Page {
    Screen(Screen),
    Notebook(Notebook),
    /// A page with a title and nothing on it yet.
    Blank(String),
}

pub struct Tab {
    pub title: String,
    pub page: Page,
}

#[derive(Default)]
pub struct Notebook {
    tabs: Vec<Tab>,
    active: usize,
}

impl Notebook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tab(&mut self, title: impl Into<String>, page: Page) -> &mut Self {
        self.tabs.push(Tab {
            title: title.into(),
            page,
        });
        self
    }

    pub fn titles(&self) -> Vec<&str> {
        self.tabs.iter().map(|t| t.title.as_str()).collect()
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn tab(&self, index: usize) -> Option<&Tab> {
        self.tabs.get(index)
    }

    fn index_of(&self, title: &str) -> Option<usize> {
        self.tabs
            .iter()
            .position(|t| t.title.eq_ignore_ascii_case(title.trim()))
    }

    /// Make tab `index` active and show what it holds. A nested notebook
    /// shows its own active tab. Returns `None` for blank pages.
    pub fn show(&mut self, index: usize) -> Result<Option<Outcome>, AppError> {
        let tab = self
            .tabs
            .get_mut(index)
            .ok_or_else(|| AppError::UnknownTab(index.to_string()))?;
        self.active = index;
        match &mut tab.page {
            Page::Screen(screen) => screen.press(Command::Show).map(Some),
            Page::Notebook(inner) => {
                let current = inner.active;
                inner.show(current)
            }
            Page::Blank(_) => Ok(None),
        }
    }

    /// Follow a path of tab titles, e.g. `["Setup", "Customers"]`, showing
    /// each level on the way. Titles match case-insensitively.
    pub fn open<S: AsRef<str>>(&mut self, path: &[S]) -> Result<Option<Outcome>, AppError> {
        let Some((first, rest)) = path.split_first() else {
            let current = self.active;
            return self.show(current);
        };
        let index = self
            .index_of(first.as_ref())
            .ok_or_else(|| AppError::UnknownTab(first.as_ref().to_string()))?;

        if rest.is_empty() {
            return self.show(index);
        }
        self.active = index;
        match &mut self.tabs[index].page {
            Page::Notebook(inner) => inner.open(rest),
            _ => Err(AppError::UnknownTab(rest[0].as_ref().to_string())),
        }
    }

    /// Titles of the active tab at every level.
    pub fn path(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut nb = self;
        while let Some(tab) = nb.tabs.get(nb.active) {
            out.push(tab.title.clone());
            match &tab.page {
                Page::Notebook(inner) => nb = inner,
                _ => break,
            }
        }
        out
    }

    pub fn active_page(&self) -> Option<&Page> {
        let tab = self.tabs.get(self.active)?;
        match &tab.page {
            Page::Notebook(inner) => inner.active_page(),
            page => Some(page),
        }
    }

    pub fn active_screen(&self) -> Option<&Screen> {
        match self.active_page()? {
            Page::Screen(screen) => Some(screen),
            _ => None,
        }
    }

    pub fn active_screen_mut(&mut self) -> Option<&mut Screen> {
        let tab = self.tabs.get_mut(self.active)?;
        match &mut tab.page {
            Page::Screen(screen) => Some(screen),
            Page::Notebook(inner) => inner.active_screen_mut(),
            Page::Blank(_) => None,
        }
    }

    /// Every screen in the tree, depth first.
    pub fn screens(&self) -> Vec<&Screen> {
        let mut out = Vec::new();
        for tab in &self.tabs {
            match &tab.page {
                Page::Screen(screen) => out.push(screen),
                Page::Notebook(inner) => out.extend(inner.screens()),
                Page::Blank(_) => {}
            }
        }
        out
    }
}
