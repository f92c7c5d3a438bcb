pub mod domain;
pub mod ports;

pub use domain::{
    Document, FilterState, Format, GenerationRequest, Pagination, RegisteredAccount,
    Registration, Route, Session, SortOrder, TemplateType, UnknownVariant, UserProfile, View,
};
pub use ports::{
    AuthView, Clipboard, DocumentRow, DocumentView, FileSink, FormView, GenerateView,
    KeyValueStore, ListView, Navigator, PageLink, PaginationControls, PortError, PortResult,
    PrdService,
};
