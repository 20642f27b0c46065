//! The FindItem operation: search a folder for items matching a restriction.
//!
//! <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/finditem-operation>

use serde::{Deserialize, Serialize};

use crate::client::EwsClient;
use crate::operations::{classify, ResponseClass};
use crate::{envelope, Result};

/// Folder traversal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Traversal {
    #[default]
    Shallow,
    SoftDeleted,
    Associated,
}

/// Property set returned for each item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum BaseShape {
    IdOnly,
    #[default]
    Default,
    AllProperties,
}

/// A property path, e.g. `item:Subject` or `message:From`.
#[derive(Debug, Clone, Serialize)]
pub struct FieldUri {
    #[serde(rename = "@FieldURI")]
    pub field_uri: String,
}

impl FieldUri {
    pub fn new(field_uri: impl Into<String>) -> Self {
        Self {
            field_uri: field_uri.into(),
        }
    }
}

/// Extra properties requested on top of the base shape.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdditionalProperties {
    #[serde(rename = "t:FieldURI")]
    pub field_uris: Vec<FieldUri>,
}

/// Shape of the items to return.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemShape {
    #[serde(rename = "t:BaseShape")]
    pub base_shape: BaseShape,
    #[serde(rename = "t:AdditionalProperties", skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
}

/// Paging anchor for indexed views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum BasePoint {
    #[default]
    Beginning,
    End,
}

/// Indexed paging over the result view.
#[derive(Debug, Clone, Serialize)]
pub struct IndexedPageItemView {
    #[serde(rename = "@MaxEntriesReturned", skip_serializing_if = "Option::is_none")]
    pub max_entries_returned: Option<u32>,
    #[serde(rename = "@Offset")]
    pub offset: u32,
    #[serde(rename = "@BasePoint")]
    pub base_point: BasePoint,
}

/// A well-known folder name, e.g. `inbox` or `sentitems`.
#[derive(Debug, Clone, Serialize)]
pub struct DistinguishedFolderId {
    #[serde(rename = "@Id")]
    pub id: String,
}

impl DistinguishedFolderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Folders to search.
#[derive(Debug, Clone, Serialize)]
pub struct ParentFolderIds {
    #[serde(rename = "t:DistinguishedFolderId")]
    pub distinguished_folder_id: DistinguishedFolderId,
}

impl Default for ParentFolderIds {
    fn default() -> Self {
        Self {
            distinguished_folder_id: DistinguishedFolderId::new("inbox"),
        }
    }
}

/// A constant value in a filter expression.
#[derive(Debug, Clone, Serialize)]
pub struct Constant {
    #[serde(rename = "@Value")]
    pub value: String,
}

impl Constant {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldUriOrConstant {
    #[serde(rename = "t:Constant")]
    pub constant: Constant,
}

/// Equality filter on a single property.
#[derive(Debug, Clone, Serialize)]
pub struct IsEqualTo {
    #[serde(rename = "t:FieldURI")]
    pub field_uri: FieldUri,
    #[serde(rename = "t:FieldURIOrConstant")]
    pub field_uri_or_constant: FieldUriOrConstant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ContainmentMode {
    FullString,
    Prefixed,
    #[default]
    Substring,
    PrefixOnWords,
    ExactPhrase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ContainmentComparison {
    Exact,
    IgnoreCase,
    IgnoreNonSpacingCharacters,
    #[default]
    IgnoreCaseAndNonSpacingCharacters,
}

/// Substring filter on a text property.
#[derive(Debug, Clone, Serialize)]
pub struct Contains {
    #[serde(rename = "@ContainmentMode")]
    pub containment_mode: ContainmentMode,
    #[serde(rename = "@ContainmentComparison")]
    pub containment_comparison: ContainmentComparison,
    #[serde(rename = "t:FieldURI")]
    pub field_uri: FieldUri,
    #[serde(rename = "t:Constant")]
    pub constants: Vec<Constant>,
}

/// Search restriction. At most one branch is set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Restriction {
    #[serde(rename = "t:IsEqualTo", skip_serializing_if = "Option::is_none")]
    pub is_equal_to: Option<IsEqualTo>,
    #[serde(rename = "t:Contains", skip_serializing_if = "Option::is_none")]
    pub contains: Option<Contains>,
}

/// FindItem request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename = "m:FindItem")]
pub struct FindItemRequest {
    #[serde(rename = "@Traversal")]
    pub traversal: Traversal,
    #[serde(rename = "m:ItemShape")]
    pub item_shape: ItemShape,
    #[serde(rename = "m:IndexedPageItemView", skip_serializing_if = "Option::is_none")]
    pub indexed_page_item_view: Option<IndexedPageItemView>,
    #[serde(rename = "m:ParentFolderIds")]
    pub parent_folder_ids: ParentFolderIds,
    #[serde(rename = "m:Restriction", skip_serializing_if = "Option::is_none")]
    pub restriction: Option<Restriction>,
}

impl Default for FindItemRequest {
    /// Shallow search of the inbox with the default item shape.
    fn default() -> Self {
        Self {
            traversal: Traversal::default(),
            item_shape: ItemShape::default(),
            indexed_page_item_view: None,
            parent_folder_ids: ParentFolderIds::default(),
            restriction: None,
        }
    }
}

/// FindItem response body.
#[derive(Debug, Clone, Deserialize)]
pub struct FindItemResponse {
    #[serde(rename = "ResponseMessages", alias = "m:ResponseMessages")]
    pub response_messages: FindItemResponseMessages,
}

impl FindItemResponse {
    /// Items found in the root folder, empty when the folder had none.
    pub fn messages(&self) -> &[ItemSummary] {
        self.response_messages
            .find_item_response_message
            .root_folder
            .as_ref()
            .map(|folder| folder.items.messages.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FindItemResponseMessages {
    #[serde(
        rename = "FindItemResponseMessage",
        alias = "m:FindItemResponseMessage"
    )]
    pub find_item_response_message: FindItemResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FindItemResponseMessage {
    #[serde(rename = "@ResponseClass")]
    pub response_class: ResponseClass,
    #[serde(rename = "ResponseCode", alias = "m:ResponseCode", default)]
    pub response_code: Option<String>,
    #[serde(rename = "MessageText", alias = "m:MessageText", default)]
    pub message_text: Option<String>,
    #[serde(rename = "RootFolder", alias = "m:RootFolder", default)]
    pub root_folder: Option<RootFolder>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RootFolder {
    #[serde(rename = "@IndexedPagingOffset", default)]
    pub indexed_paging_offset: Option<i32>,
    #[serde(rename = "@TotalItemsInView", default)]
    pub total_items_in_view: i32,
    #[serde(rename = "@IncludesLastItemInRange", default)]
    pub includes_last_item_in_range: bool,
    #[serde(rename = "Items", alias = "t:Items", default)]
    pub items: Items,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Items {
    #[serde(rename = "Message", alias = "t:Message", default)]
    pub messages: Vec<ItemSummary>,
}

/// One found item, in the summary shape FindItem returns.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemSummary {
    #[serde(rename = "ItemId", alias = "t:ItemId")]
    pub item_id: ItemId,
    #[serde(rename = "Subject", alias = "t:Subject", default)]
    pub subject: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemId {
    #[serde(rename = "@Id")]
    pub id: String,
    #[serde(rename = "@ChangeKey", default)]
    pub change_key: Option<String>,
}

impl EwsClient {
    /// Searches a folder for items matching the request.
    ///
    /// Fails with [`Error::Fault`](crate::Error::Fault) carrying the server's
    /// message text when the response class is not `Success`.
    pub async fn find_item(&self, request: &FindItemRequest) -> Result<FindItemResponse> {
        let payload = quick_xml::se::to_string(request)?;
        let raw = self.send_and_receive(payload.as_bytes()).await?;

        let response: FindItemResponse = envelope::parse_response_body(&raw)?;
        let message = &response.response_messages.find_item_response_message;
        classify(
            message.response_class,
            message.response_code.as_deref(),
            message.message_text.as_deref(),
        )?;
        Ok(response)
    }
}
