use ratatui::layout::{Constraint, Direction, Layout as RatLayout, Rect};

pub struct Layout {
    pub inner_area: Rect, // Area inside the outer border
    pub header_area: Rect,
    pub sidebar_area: Rect,
    pub main_area: Rect,
    pub search_area: Rect,
    pub status_area: Rect,
}

impl Layout {
    /// Smallest usable terminal, excluding the outer border.
    /// Width fits the minimum sidebar (24) next to a readable task list.
    pub const MIN_WIDTH: u16 = 60;
    pub const MIN_HEIGHT: u16 = 12;

    pub fn calculate(size: Rect, sidebar_width_percent: u16, sidebar_collapsed: bool) -> Self {
        let width = size.width.max(Self::MIN_WIDTH + 2);
        let height = size.height.max(Self::MIN_HEIGHT + 2);
        let size = Rect::new(size.x, size.y, width, height);

        let inner_area = Rect::new(
            size.x + 1,
            size.y + 1,
            size.width.saturating_sub(2),
            size.height.saturating_sub(2),
        );

        // Between 24 columns and 40%, always leaving 30 columns for the task list
        let sidebar_width = if sidebar_collapsed {
            0
        } else {
            let requested = percent_of(inner_area.width, sidebar_width_percent);
            let max_width = percent_of(inner_area.width, 40);
            requested
                .max(24)
                .min(max_width)
                .min(inner_area.width.saturating_sub(30))
        };

        let vertical = RatLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(1),    // Sidebar + task list
                Constraint::Length(3), // Search box
                Constraint::Length(1), // Status
            ])
            .split(inner_area);

        let horizontal = RatLayout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(sidebar_width), Constraint::Min(1)])
            .split(vertical[1]);

        Self {
            inner_area,
            header_area: vertical[0],
            sidebar_area: horizontal[0],
            main_area: horizontal[1],
            search_area: vertical[2],
            status_area: vertical[3],
        }
    }
}

/// `percent` of `width`, with the percent capped at 100 and the math done in u32
fn percent_of(width: u16, percent: u16) -> u16 {
    let scaled = u32::from(width) * u32::from(percent.min(100)) / 100;
    // Never exceeds `width`, so it fits back into u16
    scaled as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidebar_width_is_clamped() {
        let layout = Layout::calculate(Rect::new(0, 0, 102, 40), 28, false);
        assert_eq!(layout.inner_area.width, 100);
        assert_eq!(layout.sidebar_area.width, 28);
        assert_eq!(layout.main_area.width, 72);

        let wide = Layout::calculate(Rect::new(0, 0, 102, 40), 90, false);
        assert_eq!(wide.sidebar_area.width, 40);

        let narrow = Layout::calculate(Rect::new(0, 0, 102, 40), 5, false);
        assert_eq!(narrow.sidebar_area.width, 24);
    }

    #[test]
    fn test_collapsed_sidebar_gives_main_full_width() {
        let layout = Layout::calculate(Rect::new(0, 0, 80, 24), 28, true);
        assert_eq!(layout.sidebar_area.width, 0);
        assert_eq!(layout.main_area.width, 78);
        assert_eq!(layout.header_area.height, 1);
        assert_eq!(layout.search_area.height, 3);
        assert_eq!(layout.status_area.height, 1);
    }

    #[test]
    fn test_oversized_sidebar_percent_does_not_overflow() {
        let layout = Layout::calculate(Rect::new(0, 0, 1002, 40), u16::MAX, false);
        assert_eq!(layout.sidebar_area.width, 400);
        assert_eq!(layout.main_area.width, 600);
        assert_eq!(percent_of(u16::MAX, 100), u16::MAX);
    }
}
