#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DialogState {
    #[default]
    Idle,
    AwaitingPhoto,
    AwaitingBroadcastText,
}
