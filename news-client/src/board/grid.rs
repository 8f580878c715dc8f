/// Direction of a one-step move inside a grid row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    /// Towards column `0`.
    Left,
    /// Towards the last column.
    Right,
}

/// Number of grid columns shown at a viewport `width` in pixels.
pub fn columns_for_width(width: u32) -> usize {
    if width >= 1024 {
        3
    } else if width >= 768 {
        2
    } else {
        1
    }
}

/// Index the item at `index` lands on after a move, or `None` when the move
/// would leave its row or the list.
pub fn move_target(
    index: usize,
    len: usize,
    columns: usize,
    direction: MoveDirection,
) -> Option<usize> {
    if index >= len {
        return None;
    }
    let columns = columns.max(1);
    let row = index / columns;

    match direction {
        MoveDirection::Left => (index % columns > 0).then(|| index - 1),
        MoveDirection::Right => {
            let target = index + 1;
            (target < len && target / columns == row).then_some(target)
        }
    }
}
