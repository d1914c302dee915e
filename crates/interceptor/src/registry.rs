//! 方法类型注册表
//!
//! 服务启动时根据方法清单构建一次，之后只读。每个方法分配一个 [`MethodId`]，
//! 调用建立时按路径查一次，之后所有事件都按 id 定位

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{InterceptError, InterceptResult};
use crate::message::{MessageDescriptor, WireMessage};
use crate::phase::{Cardinality, Role};

/// 注册表内的方法编号，只在产生它的注册表内有效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodId(u32);

impl MethodId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// 方法清单中的一项
#[derive(Debug, Clone)]
pub struct MethodSpec {
    pub path: String,
    pub cardinality: Cardinality,
    pub request: MessageDescriptor,
    pub response: MessageDescriptor,
}

impl MethodSpec {
    pub fn new<Req: WireMessage, Resp: WireMessage>(
        path: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            path: path.into(),
            cardinality,
            request: MessageDescriptor::of::<Req>(),
            response: MessageDescriptor::of::<Resp>(),
        }
    }

    pub fn unary<Req: WireMessage, Resp: WireMessage>(path: impl Into<String>) -> Self {
        Self::new::<Req, Resp>(path, Cardinality::Unary)
    }

    pub fn client_streaming<Req: WireMessage, Resp: WireMessage>(path: impl Into<String>) -> Self {
        Self::new::<Req, Resp>(path, Cardinality::ClientStreaming)
    }

    pub fn server_streaming<Req: WireMessage, Resp: WireMessage>(path: impl Into<String>) -> Self {
        Self::new::<Req, Resp>(path, Cardinality::ServerStreaming)
    }

    pub fn bidi_streaming<Req: WireMessage, Resp: WireMessage>(path: impl Into<String>) -> Self {
        Self::new::<Req, Resp>(path, Cardinality::BidiStreaming)
    }
}

/// 某一侧视角下的请求/响应类型
#[derive(Debug, Clone, Copy)]
pub struct RoleTypes<'a> {
    pub role: Role,
    pub request: &'a MessageDescriptor,
    pub response: &'a MessageDescriptor,
}

impl<'a> RoleTypes<'a> {
    /// 本侧发出的消息类型
    pub fn send(&self) -> &'a MessageDescriptor {
        match self.role {
            Role::Caller => self.request,
            Role::Callee => self.response,
        }
    }

    /// 本侧收到的消息类型
    pub fn recv(&self) -> &'a MessageDescriptor {
        match self.role {
            Role::Caller => self.response,
            Role::Callee => self.request,
        }
    }
}

#[derive(Debug)]
struct MethodEntry {
    path: Arc<str>,
    cardinality: Cardinality,
    request: MessageDescriptor,
    response: MessageDescriptor,
}

/// 方法类型注册表
#[derive(Debug)]
pub struct MethodTypeRegistry {
    methods: Vec<MethodEntry>,
    index: HashMap<Arc<str>, MethodId>,
}

impl MethodTypeRegistry {
    /// 根据服务的方法清单构建注册表
    pub fn from_inventory(
        inventory: impl IntoIterator<Item = MethodSpec>,
    ) -> InterceptResult<Self> {
        let mut methods = Vec::new();
        let mut index = HashMap::new();

        for spec in inventory {
            if !is_method_path(&spec.path) {
                return Err(InterceptError::InvalidMethod(spec.path));
            }
            let path: Arc<str> = Arc::from(spec.path.as_str());
            if index.contains_key(&path) {
                return Err(InterceptError::DuplicateMethod(spec.path));
            }

            let id = MethodId(methods.len() as u32);
            index.insert(path.clone(), id);
            methods.push(MethodEntry {
                path,
                cardinality: spec.cardinality,
                request: spec.request,
                response: spec.response,
            });
        }

        Ok(Self { methods, index })
    }

    pub fn lookup(&self, path: &str) -> InterceptResult<MethodId> {
        self.index
            .get(path)
            .copied()
            .ok_or_else(|| InterceptError::lookup(path))
    }

    /// 按方法路径与角色查询类型
    pub fn descriptors(&self, path: &str, role: Role) -> InterceptResult<RoleTypes<'_>> {
        let id = self.lookup(path)?;
        Ok(self.types(id, role))
    }

    pub fn types(&self, id: MethodId, role: Role) -> RoleTypes<'_> {
        let entry = &self.methods[id.index()];
        RoleTypes {
            role,
            request: &entry.request,
            response: &entry.response,
        }
    }

    pub fn cardinality(&self, id: MethodId) -> Cardinality {
        self.methods[id.index()].cardinality
    }

    pub fn path(&self, id: MethodId) -> &Arc<str> {
        &self.methods[id.index()].path
    }

    /// 启动期校验：服务暴露的每个方法都必须已登记
    pub fn validate<'p>(&self, paths: impl IntoIterator<Item = &'p str>) -> InterceptResult<()> {
        for path in paths {
            self.lookup(path)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(|m| &*m.path)
    }
}

fn is_method_path(path: &str) -> bool {
    let Some(rest) = path.strip_prefix('/') else {
        return false;
    };
    match rest.split_once('/') {
        Some((service, method)) => {
            !service.is_empty() && !method.is_empty() && !method.contains('/')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Envelope, Ping, test_registry};

    #[test]
    fn test_role_types_follow_direction() {
        let registry = test_registry();

        let caller = registry
            .descriptors("/guide.test.Echo/Wrap", Role::Caller)
            .unwrap();
        assert_eq!(caller.send(), &MessageDescriptor::of::<Ping>());
        assert_eq!(caller.recv(), &MessageDescriptor::of::<Envelope>());

        let callee = registry
            .descriptors("/guide.test.Echo/Wrap", Role::Callee)
            .unwrap();
        assert_eq!(callee.send(), &MessageDescriptor::of::<Envelope>());
        assert_eq!(callee.recv(), &MessageDescriptor::of::<Ping>());
    }

    #[test]
    fn test_lookup_unknown_method_fails() {
        let registry = test_registry();
        let err = registry.lookup("/guide.test.Echo/Missing").unwrap_err();
        assert!(matches!(err, InterceptError::Lookup(ref m) if m == "/guide.test.Echo/Missing"));
        assert!(registry.validate(["/guide.test.Echo/Missing"]).is_err());
        assert!(registry.validate(["/guide.test.Echo/Ping"]).is_ok());
    }

    #[test]
    fn test_ids_are_dense_and_stable() {
        let registry = test_registry();
        let ids: Vec<_> = registry
            .paths()
            .map(|p| registry.lookup(p).unwrap().index())
            .collect();
        assert_eq!(ids, (0..registry.len()).collect::<Vec<_>>());

        let id = registry.lookup("/guide.test.Echo/Stream").unwrap();
        assert_eq!(registry.cardinality(id), Cardinality::BidiStreaming);
        assert_eq!(&**registry.path(id), "/guide.test.Echo/Stream");
    }

    #[test]
    fn test_rejects_malformed_and_duplicate_paths() {
        for bad in ["Echo/Ping", "/Echo", "/Echo/", "//Ping", "/a/b/c"] {
            let err = MethodTypeRegistry::from_inventory([MethodSpec::unary::<Ping, Ping>(bad)])
                .unwrap_err();
            assert!(matches!(err, InterceptError::InvalidMethod(_)), "{bad}");
        }

        let err = MethodTypeRegistry::from_inventory([
            MethodSpec::unary::<Ping, Ping>("/svc/A"),
            MethodSpec::unary::<Ping, Envelope>("/svc/A"),
        ])
        .unwrap_err();
        assert!(matches!(err, InterceptError::DuplicateMethod(_)));
    }
}
