pub mod answer_sheet;
pub mod loaders;
pub mod question;
pub mod question_set;
pub mod reference;
pub mod subtype;
pub mod test_bundle;

pub use answer_sheet::AnswerSheet;
pub use loaders::{load_all_bundles, load_bundle};
pub use question::{QuestionRecord, QuestionType, RecordId};
pub use question_set::QuestionSet;
pub use reference::{Audio, Passage, Referenced};
pub use subtype::SubtypeSource;
pub use test_bundle::{
    Response, SavedTest, SubmitReceipt, TestDetail, TestForEdit, TestMetadata, TestPayload,
};
